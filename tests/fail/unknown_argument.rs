use adornable::adornable;

pub struct Clock;

#[adornable(receivers = 1)]
impl Clock {
    #[decorate(log)]
    fn zero() -> u8 {
        0
    }
}

fn main() {
    let _ = Clock;
}
