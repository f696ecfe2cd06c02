use adornable::adornable;

pub struct Wrapper<T>(T);

#[adornable]
impl<T> Wrapper<T> {
    #[decorate(log)]
    fn zero() -> u8 {
        0
    }
}

fn main() {
    let _ = Wrapper(1u8);
}
