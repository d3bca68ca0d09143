use tamper_encodings::Value;

/// One input record: a guid plus named attribute values, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    guid: u64,
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new(guid: u64) -> Row {
        Row {
            guid,
            fields: Vec::new(),
        }
    }

    /// Builder-style [`Row::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Row {
        self.set(name, value);
        self
    }

    /// Sets attribute `name`, replacing a previous value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn guid(&self) -> u64 {
        self.guid
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
