use adornable::adornable;

pub struct Picker;

#[adornable]
impl Picker {
    #[decorate(log)]
    fn pick<T>(value: T) -> T {
        value
    }
}

fn main() {
    let _ = Picker;
}
