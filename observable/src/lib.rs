/*!
A single-value reactive cell.

An [`Observable<T>`] holds exactly one current value and a list of observers. Setting the
value notifies every observer synchronously, in subscription order, before `set`
returns. Cells compose with [`Observable::map`] and [`Observable::flat_map`], and cells
holding an [`Outcome`] chain with `then` / `next`, which short-circuit on the first failure.

# Design
- Notification is push-based and synchronous. Nothing here blocks or suspends.
- Single writer by convention. Use a [`Dispatcher`] (feature `tokio`) when writers live on
  other threads or tasks.
- Derived cells own their upstream subscription and are only weakly referenced by their
  source, so the caller keeps a chain alive by holding its tail (the derived cell or a
  [`SubscriptionGuard`]). Dropping the tail detaches the whole chain.
- `subscribe` replays the current value immediately; `listen` only reports future changes.

# Basic usage

```rust
use observable::*;

let name = Observable::new("Tom".to_string());
let greeting = name.map(|name| format!("Hello {name}"));
let _guard = greeting.subscribe(|greeting| println!("{greeting}"));
// prints: Hello Tom

name.set("World".to_string());
// prints: Hello World
assert_eq!(greeting.get(), "Hello World");
```

# Outcome chaining

```rust
use observable::*;

fn uppercased(text: String) -> Observable<Outcome<String>> { Observable::new(Ok(text.to_uppercase())) }

let zen: Observable<Outcome<String>> = Observable::not_loaded();
let _guard = zen.then(uppercased).next(|text| println!("uppercased: {text}"));
// nothing printed: the chain short-circuits on `Failure::NotLoaded`

zen.set(Ok("Design for failure.".to_string()));
// prints: uppercased: DESIGN FOR FAILURE.
```
*/

pub mod broadcast;
mod error;
mod observable;
mod outcome;
pub mod porcelain;

#[cfg(feature = "tokio")]
pub mod dispatch;

pub use broadcast::BroadcastId;
pub use error::*;
pub use observable::*;
pub use outcome::*;
pub use porcelain::*;

#[cfg(feature = "tokio")]
pub use dispatch::{DispatchHandle, Dispatcher, DispatcherConfig, DispatcherConfigBuilder, Writer};
