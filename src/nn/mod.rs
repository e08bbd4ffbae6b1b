pub mod init;
pub mod layers;
pub mod module;
pub mod parameter;

pub use module::Module;
pub use parameter::Parameter;
