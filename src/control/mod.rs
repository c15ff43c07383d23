// External collaborators, defined only at their interface:
// the virtual controller (actuator) and the OS window manager.

pub mod actuator;
pub mod window;
