//! Parse the `||` delimited lines produced by the engine `--format` templates.
use std::collections::HashMap;
use tracing::debug;

/// Field separator used in every format template.
pub const FIELD_SEPARATOR: &str = "||";

/// Value printed by the engine templates for a missing map key.
pub const NO_VALUE: &str = "<no value>";

/// Access to the cells of a row by column key.
pub trait Tabular {
    /// Value of the `key` column, if the row knows it.
    fn cell(&self, key: &str) -> Option<&str>;
}

/// Key/value record parsed from a `KEY=value||KEY=value` line.
pub type Record = HashMap<String, String>;

impl Tabular for Record {
    fn cell(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// One running container as listed by `ps`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Container {
    /// short container id
    pub id: String,
    /// container name(s)
    pub name: String,
    /// image reference
    pub image: String,
    /// published ports
    pub ports: String,
}

impl Container {
    /// Parse a `ID||NAME||IMAGE||PORTS` line. Missing trailing fields are left empty
    /// and extra fields are ignored.
    ///
    /// ```
    /// use dok::parse::Container;
    /// let c = Container::from_line("abc||web");
    /// assert_eq!(c.name, "web");
    /// assert_eq!(c.ports, "");
    /// ```
    pub fn from_line(line: &str) -> Self {
        let mut fields = line.split(FIELD_SEPARATOR).map(str::to_owned);
        Container {
            id: fields.next().unwrap_or_default(),
            name: fields.next().unwrap_or_default(),
            image: fields.next().unwrap_or_default(),
            ports: fields.next().unwrap_or_default(),
        }
    }
}

impl Tabular for Container {
    fn cell(&self, key: &str) -> Option<&str> {
        match key {
            "ID" => Some(self.id.as_str()),
            "NAME" => Some(self.name.as_str()),
            "IMAGE" => Some(self.image.as_str()),
            "PORTS" => Some(self.ports.as_str()),
            _ => None,
        }
    }
}

/// Non empty lines of `output`, trailing whitespace of the whole text removed.
fn lines(output: &str) -> impl Iterator<Item = &str> {
    output.trim_end().split('\n').filter(|l| !l.is_empty())
}

/// Parse every line of a `ps` listing.
pub fn parse_containers(output: &str) -> Vec<Container> {
    let res: Vec<Container> = lines(output).map(Container::from_line).collect();
    debug!("Parsed containers {:#?}", res);
    res
}

/// Parse one `KEY=value||KEY=value` line. The value is everything after the first `=`.
pub fn parse_record(line: &str) -> Record {
    line.split(FIELD_SEPARATOR)
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (key.to_owned(), value.to_owned()),
            None => (segment.to_owned(), String::new()),
        })
        .collect()
}

/// Parse every line of a key/value listing.
pub fn parse_records(output: &str) -> Vec<Record> {
    let res: Vec<Record> = lines(output).map(parse_record).collect();
    debug!("Parsed records {:#?}", res);
    res
}

/// `true` when an inspected label value denotes a present label.
pub fn is_label_set(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != NO_VALUE
}
