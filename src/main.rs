use std::time::Instant;

use adornable::{DecoratorSet, Identified, InstanceId, ReceiverRef, adornable};
use tracing::info;

/// Times the rest of the chain and reports it under the `stat` option.
fn timing_decorators() -> ReceiverRef {
    DecoratorSet::class("Timing")
        .with("time", |context, next, options| {
            let stat = options
                .get("stat")
                .and_then(|stat| stat.as_str())
                .unwrap_or(context.method_name())
                .to_string();
            let start = Instant::now();
            let result = next.proceed();
            println!("{stat} {}ms", start.elapsed().as_millis());
            result
        })
        .into_ref()
}

struct Dog {
    id: InstanceId,
    name: String,
}

impl Identified for Dog {
    fn instance_id(&self) -> u64 {
        self.id.get()
    }
}

#[adornable(decorators_from = timing_decorators())]
impl Dog {
    #[decorate(time, stat = "bark")]
    fn bark() -> String {
        std::thread::sleep(std::time::Duration::from_millis(30));
        "Woof!".to_string()
    }

    #[decorate(log)]
    #[decorate(memoize)]
    fn describe(&self) -> String {
        info!(name = %self.name, "describing dog");
        format!("{} is a good dog", self.name)
    }

    #[decorate(log)]
    #[decorate(memoize_for_arguments)]
    fn fetch(&self, thing: String, times: u32) -> Vec<String> {
        (0..times).map(|_| format!("{} fetched the {thing}", self.name)).collect()
    }
}

fn main() -> adornable::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let dog = Dog {
        id: InstanceId::new(),
        name: "Rex".to_string(),
    };

    println!("{}", Dog::bark()?);
    println!("{}", dog.describe()?);
    println!("{}", dog.describe()?);
    println!("{:?}", dog.fetch("ball".to_string(), 2)?);
    println!("{:?}", dog.fetch("stick".to_string(), 1)?);
    Ok(())
}
