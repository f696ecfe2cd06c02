use adornable::adornable;

pub struct Clock;

#[adornable]
impl Clock {
    #[decorate(log)]
    async fn tick() -> u8 {
        0
    }
}

fn main() {
    let _ = Clock;
}
