use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Ordered field names of one delimited file, taken from its header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    names: Vec<String>,
    index: HashMap<String, Vec<usize>>, // name -> every position, ascending
}

impl FieldSchema {
    pub fn new(names: Vec<String>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::with_capacity(names.len());
        for (pos, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_default().push(pos);
        }
        FieldSchema { names, index }
    }

    /// Builds a schema from a raw header line. Surrounding whitespace is trimmed
    /// from the line, not from the individual names.
    pub fn from_header(line: &str, delimiter: char) -> Self {
        Self::new(line.trim().split(delimiter).map(str::to_string).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Every position `name` occupies in the header, in ascending order.
    pub fn positions(&self, name: &str) -> &[usize] {
        self.index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

/// One data line, keyed by the schema of the file it came from.
///
/// A line may carry fewer values than the schema has fields; the trailing
/// fields are then absent and `get` returns `None` for them.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<FieldSchema>,
    values: Vec<String>,
}

impl Record {
    /// Zips `values` positionally against the schema. Values beyond the
    /// schema length are dropped.
    pub fn new(schema: Arc<FieldSchema>, mut values: Vec<String>) -> Self {
        values.truncate(schema.len());
        Record { schema, values }
    }

    /// A record whose every value is its own field name.
    pub fn header(schema: Arc<FieldSchema>) -> Self {
        let values = schema.names().to_vec();
        Record { schema, values }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Value of `field`. A name repeated in the header resolves to its last
    /// occurrence that the line actually reaches.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.schema
            .positions(field)
            .iter()
            .rev()
            .find_map(|&pos| self.values.get(pos))
            .map(String::as_str)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Number of fields actually present on the line.
    pub fn present_len(&self) -> usize {
        self.values.len()
    }

    /// Fields in schema order, each with its value if present.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.schema
            .names()
            .iter()
            .map(move |name| (name.as_str(), self.get(name)))
    }
}

/// Codes a stage's records are matched against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet {
    codes: HashSet<String>,
}

impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn insert(&mut self, code: impl Into<String>) -> bool {
        self.codes.insert(code.into())
    }
}

impl<S: Into<String>> FromIterator<S> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        MembershipSet {
            codes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HarvestField {
    name: String,
    declared: usize, // how many times the name was declared
    values: Vec<String>,
}

/// Values collected from matching records, per declared field, in the order
/// the records were read. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestMap {
    fields: Vec<HarvestField>,
}

impl HarvestMap {
    /// Starts an empty sequence for each declared field. Repeated names share
    /// one sequence, which then receives each value once per declaration.
    pub fn new<S: AsRef<str>>(declared: &[S]) -> Self {
        let mut fields: Vec<HarvestField> = Vec::with_capacity(declared.len());
        for name in declared {
            let name = name.as_ref();
            match fields.iter_mut().find(|field| field.name == name) {
                Some(field) => field.declared += 1,
                None => fields.push(HarvestField {
                    name: name.to_string(),
                    declared: 1,
                    values: Vec::new(),
                }),
            }
        }
        HarvestMap { fields }
    }

    /// Appends the value of every declared field the record carries.
    pub fn collect_from(&mut self, record: &Record) {
        for field in self.fields.iter_mut() {
            if let Some(value) = record.get(&field.name) {
                for _ in 0..field.declared {
                    field.values.push(value.to_string());
                }
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.values.as_slice())
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Total number of harvested values across all fields.
    pub fn total_values(&self) -> usize {
        self.fields.iter().map(|f| f.values.len()).sum()
    }

    pub fn membership_for(&self, field: &str) -> Option<MembershipSet> {
        self.get(field)
            .map(|values| values.iter().map(String::as_str).collect())
    }
}
