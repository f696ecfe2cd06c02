use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use adornable::{DecoratorSet, Decorators, Identified, InstanceId, ReceiverRef, adornable};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;

static LOG_LINES: LazyLock<Mutex<Vec<String>>> = LazyLock::new(|| Mutex::new(Vec::new()));

static CAPTURING: LazyLock<Arc<Decorators>> =
    LazyLock::new(|| Arc::new(Decorators::with_output(|line| LOG_LINES.lock().push(line.to_string()))));

fn capturing() -> ReceiverRef {
    CAPTURING.clone()
}

fn logged(method: &str) -> Vec<String> {
    LOG_LINES
        .lock()
        .iter()
        .filter(|line| line.contains(method))
        .cloned()
        .collect()
}

fn suffix(name: &'static str, suffix: &'static str) -> DecoratorSet {
    DecoratorSet::class(format!("{name}Decorators")).with(name, move |_, next, _| {
        let value = next.proceed()?;
        Ok(json!(format!("{}{suffix}", value.as_str().unwrap_or_default())))
    })
}

fn explicit_decorators() -> ReceiverRef {
    suffix("blast_it", "!").into_ref()
}

fn implicit_decorators() -> ReceiverRef {
    suffix("wait_for_it", "...")
        .with("wait_for_it_excitedly", |_, next, _| {
            let value = next.proceed()?;
            Ok(json!(format!("{}...!", value.as_str().unwrap_or_default())))
        })
        .into_ref()
}

fn implicit_decorators_2() -> ReceiverRef {
    suffix("wait_for_it_excitedly", "...WOO!").into_ref()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i64,
    y: i64,
}

struct Foobar {
    id: InstanceId,
    computed: AtomicUsize,
}

impl Foobar {
    fn new() -> Self {
        Self {
            id: InstanceId::new(),
            computed: AtomicUsize::new(0),
        }
    }

    fn undecorated(&self) -> &'static str {
        "we are in undecorated"
    }
}

impl Identified for Foobar {
    fn instance_id(&self) -> u64 {
        self.id.get()
    }
}

#[adornable(
    decorators_from = implicit_decorators(),
    decorators_from = implicit_decorators_2(),
    decorators_from = capturing(),
)]
impl Foobar {
    #[decorate(log)]
    fn greet(&self, name: String) -> String {
        format!("Hello, {name}")
    }

    #[decorate(log)]
    fn class_greet(name: String) -> String {
        format!("Hi, {name}")
    }

    #[decorate(log)]
    #[decorate(memoize)]
    fn compute(&self) -> f64 {
        self.computed.fetch_add(1, Ordering::SeqCst);
        rand::random::<f64>()
    }

    #[decorate(memoize, for_arguments = true)]
    fn translate(&self, point: Point, by: i64) -> Point {
        self.computed.fetch_add(1, Ordering::SeqCst);
        Point {
            x: point.x + by,
            y: point.y + by,
        }
    }

    #[decorate(blast_it, from = explicit_decorators())]
    fn explicit(&self) -> String {
        "we are in explicit".to_string()
    }

    #[decorate(wait_for_it)]
    fn implicit() -> String {
        "we are in implicit".to_string()
    }

    #[decorate(wait_for_it_excitedly)]
    fn overridden(&self) -> String {
        "we are in overridden".to_string()
    }

    #[decorate("wait_for_it")]
    #[decorate(blast_it, from = explicit_decorators())]
    fn stacked(&self, times: Option<u32>) -> String {
        "go".repeat(times.unwrap_or(1) as usize)
    }
}

#[test]
fn decorated_instance_method_logs_and_returns() {
    let foobar = Foobar::new();
    assert_eq!(foobar.greet("Al".to_string()).unwrap(), "Hello, Al");
    assert_eq!(
        logged("Foobar#greet"),
        vec![r#"Calling method `Foobar#greet` with arguments `["Al"]`"#]
    );
}

#[test]
fn decorated_static_method_uses_type_name() {
    assert_eq!(Foobar::class_greet("Bo".to_string()).unwrap(), "Hi, Bo");
    assert_eq!(
        logged("Foobar::class_greet"),
        vec![r#"Calling method `Foobar::class_greet` with arguments `["Bo"]`"#]
    );
}

#[test]
fn undecorated_methods_are_untouched() {
    assert_eq!(Foobar::new().undecorated(), "we are in undecorated");
}

#[test]
fn log_then_memoize_computes_once() {
    let foobar = Foobar::new();
    let first = foobar.compute().unwrap();
    let second = foobar.compute().unwrap();
    assert_eq!(first, second);
    assert_eq!(foobar.computed.load(Ordering::SeqCst), 1);
}

#[test]
fn memoize_for_arguments_round_trips_structs() {
    let foobar = Foobar::new();
    let origin = Point { x: 0, y: 0 };
    assert_eq!(foobar.translate(origin.clone(), 2).unwrap(), Point { x: 2, y: 2 });
    assert_eq!(foobar.translate(origin.clone(), 2).unwrap(), Point { x: 2, y: 2 });
    assert_eq!(foobar.translate(origin, 3).unwrap(), Point { x: 3, y: 3 });
    assert_eq!(foobar.computed.load(Ordering::SeqCst), 2);
}

#[test]
fn custom_decorators_resolve_explicitly_and_implicitly() {
    let foobar = Foobar::new();
    assert_eq!(foobar.explicit().unwrap(), "we are in explicit!");
    assert_eq!(Foobar::implicit().unwrap(), "we are in implicit...");
    assert_eq!(foobar.overridden().unwrap(), "we are in overridden...WOO!");
}

#[test]
fn stacked_decorators_apply_outermost_first() {
    let foobar = Foobar::new();
    assert_eq!(foobar.stacked(Some(2)).unwrap(), "gogo!...");
    assert_eq!(foobar.stacked(None).unwrap(), "go!...");
}

struct Misconfigured;

fn empty_decorators() -> ReceiverRef {
    DecoratorSet::class("EmptyDecorators").into_ref()
}

#[adornable]
impl Misconfigured {
    #[decorate(log)]
    fn fine() -> u8 {
        1
    }

    #[decorate(blast_it, from = empty_decorators())]
    fn broken() -> u8 {
        2
    }
}

#[test]
fn failed_declaration_is_reported_by_every_call() {
    for result in [Misconfigured::fine(), Misconfigured::broken()] {
        let error = result.unwrap_err();
        assert!(error.is_invalid_declaration());
        assert_eq!(
            error.to_string(),
            "Decorator method `blast_it` cannot be found on `EmptyDecorators`."
        );
    }
}

struct Deferred;

impl Identified for Deferred {
    fn instance_id(&self) -> u64 {
        0
    }
}

#[adornable(name = "DeferredThing")]
impl Deferred {
    #[decorate(blast_it, from = empty_decorators(), defer_validation)]
    fn broken(&self) -> u8 {
        2
    }

    #[decorate(memoize, defer_validation = true)]
    fn fine(&self) -> u8 {
        1
    }
}

#[test]
fn deferred_declaration_fails_only_its_method() {
    let deferred = Deferred;
    assert_eq!(deferred.fine().unwrap(), 1);

    let error = deferred.broken().unwrap_err();
    assert!(error.is_invalid_declaration());
    let message = error.to_string();
    assert!(message.starts_with("Cannot decorate `DeferredThing#broken` (defined at `"));
    assert!(message.contains("adornable_macro.rs:"));
}

#[derive(Default)]
struct Meter {
    id: InstanceId,
    reading: u32,
}

impl Identified for Meter {
    fn instance_id(&self) -> u64 {
        self.id.get()
    }
}

#[adornable]
impl Meter {
    #[decorate(memoize)]
    fn read(&self) -> u32 {
        self.reading
    }
}

#[test]
fn memoize_does_not_leak_between_short_lived_receivers() {
    let seen: Vec<u32> = (0..3)
        .map(|reading| {
            Meter {
                reading,
                ..Meter::default()
            }
            .read()
            .unwrap()
        })
        .collect();
    assert_eq!(seen, vec![0, 1, 2]);
}

#[test]
fn cloned_receiver_computes_its_own_value() {
    let meter = Meter {
        reading: 7,
        ..Meter::default()
    };
    assert_eq!(meter.read().unwrap(), 7);

    let mut copy = Meter {
        id: meter.id.clone(),
        reading: meter.reading,
    };
    copy.reading = 8;
    assert_eq!(copy.read().unwrap(), 8);
    assert_eq!(meter.read().unwrap(), 7);
}

mod east {
    use adornable::adornable;

    pub struct Config;

    #[adornable]
    impl Config {
        #[decorate(memoize)]
        pub fn load() -> String {
            "east".to_string()
        }
    }
}

mod west {
    use adornable::adornable;

    pub struct Config;

    #[adornable]
    impl Config {
        #[decorate(memoize)]
        pub fn load() -> u8 {
            2
        }
    }
}

#[test]
fn same_named_types_keep_separate_memos() {
    assert_eq!(east::Config::load().unwrap(), "east");
    assert_eq!(west::Config::load().unwrap(), 2);
    assert_eq!(east::Config::load().unwrap(), "east");
}
