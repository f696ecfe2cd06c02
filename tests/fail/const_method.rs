use adornable::adornable;

pub struct Clock;

#[adornable]
impl Clock {
    #[decorate(log)]
    const fn zero() -> u8 {
        0
    }
}

fn main() {
    let _ = Clock;
}
