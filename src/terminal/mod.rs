//! Terminal handling: input mode switching and keystroke echo

pub mod console;
pub mod echo;
pub mod util;

pub use console::{ConsoleGuard, InputMode};
pub use echo::Echo;
pub use util::{restore_termios, set_raw_mode};
