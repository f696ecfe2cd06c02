use adornable::adornable;

pub struct Clock;

#[adornable]
impl Clock {
    #[decorate(memoize, for_arguments)]
    fn zero() -> u8 {
        0
    }
}

fn main() {
    let _ = Clock;
}
