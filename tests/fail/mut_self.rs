use adornable::adornable;

pub struct Clock;

#[adornable]
impl Clock {
    #[decorate(log)]
    fn reset(&mut self) -> u8 {
        0
    }
}

fn main() {
    let _ = Clock;
}
