mod outcome;
pub use outcome::*;
mod package;
pub use package::*;
mod settings;
pub use settings::*;
mod work_item;
pub use work_item::*;
