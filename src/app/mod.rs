pub mod dispatch;
pub mod status;
pub mod tutor;

pub use dispatch::dispatch;
pub use tutor::Tutor;
