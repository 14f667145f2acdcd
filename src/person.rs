use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    pub age: u32,
}

impl Person {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Person {
            name: name.into(),
            age,
        }
    }
}
