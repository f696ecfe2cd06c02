use adornable::{DecoratorSet, Identified, ReceiverRef, adornable};
use serde_json::json;

fn doubling() -> ReceiverRef {
    DecoratorSet::class("Doubling")
        .with("double", |_, next, _| {
            let value = next.proceed()?;
            Ok(json!(value.as_i64().unwrap_or_default() * 2))
        })
        .into_ref()
}

struct Math;

impl Identified for Math {
    fn instance_id(&self) -> u64 {
        0
    }
}

#[adornable(decorators_from = doubling())]
impl Math {
    #[decorate(double)]
    #[decorate(double, note = "applied twice")]
    fn four() -> i64 {
        1
    }

    #[decorate(double, from = doubling())]
    fn two(&self) -> i64 {
        1
    }
}

fn main() {
    assert_eq!(Math::four().unwrap(), 4);
    assert_eq!(Math.two().unwrap(), 2);
}
