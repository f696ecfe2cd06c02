use adornable::decorate;

#[decorate(log)]
fn free() -> u8 {
    1
}

fn main() {
    let _ = free();
}
