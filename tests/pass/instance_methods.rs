use adornable::{Identified, InstanceId, adornable};

struct Counter {
    id: InstanceId,
    start: i32,
}

impl Identified for Counter {
    fn instance_id(&self) -> u64 {
        self.id.get()
    }
}

#[adornable]
impl Counter {
    #[decorate(log)]
    pub fn offset(&self, by: i32) -> i32 {
        self.start + by
    }

    #[decorate(memoize)]
    fn nothing(&self) {}
}

fn main() {
    let counter = Counter {
        id: InstanceId::new(),
        start: 40,
    };
    assert_eq!(counter.offset(2).unwrap(), 42);
    counter.nothing().unwrap();
}
