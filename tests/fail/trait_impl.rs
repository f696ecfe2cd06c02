use adornable::adornable;

pub struct Clock;

#[adornable]
impl Default for Clock {
    #[decorate(log)]
    fn default() -> Self {
        Clock
    }
}

fn main() {
    let _ = Clock;
}
