use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

/// Returns an accumulating callback and a function that drains what it has seen so far
#[allow(unused)]
pub fn watcher<T: Send + 'static>() -> (impl Fn(T) + Send + Sync + Clone + 'static, impl Fn() -> Vec<T>) {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let accumulate = {
        let changes = changes.clone();
        move |value: T| changes.lock().unwrap().push(value)
    };
    let check = move || changes.lock().unwrap().drain(..).collect::<Vec<T>>();
    (accumulate, check)
}
