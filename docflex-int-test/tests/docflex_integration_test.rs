mod repository;

pub use repository::*;

#[ctor::ctor]
fn init() {
    colog::init();
}
