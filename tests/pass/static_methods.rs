use adornable::adornable;
use std::collections::BTreeMap;

pub struct Registry;

#[adornable(name = "Registry")]
impl Registry {
    /// Builds a lookup table.
    #[decorate(memoize_for_arguments)]
    pub fn table(keys: Vec<String>) -> BTreeMap<String, usize> {
        keys.into_iter().enumerate().map(|(index, key)| (key, index)).collect()
    }
}

fn main() {
    let table = Registry::table(vec!["a".to_string(), "b".to_string()]).unwrap();
    assert_eq!(table.get("b"), Some(&1));
}
