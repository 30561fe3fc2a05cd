//! Declarative description of the database: collections, their validation
//! contracts, their indexes and the reference rows seeded into them.
//!
//! Nothing in here talks to a backend. The provisioning code walks these
//! descriptors in declaration order.

use ::serde_json::{json, Map, Value};

pub mod collections;
pub mod seed;

pub use seed::{SeedRecord, SeedSet};

/// BSON type aliases accepted by `$jsonSchema`'s `bsonType` keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Date,
    ObjectId,
    Bool,
    Int,
    Long,
    Array,
    Object,
    Null,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Date => "date",
            TypeTag::ObjectId => "objectId",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Long => "long",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Null => "null",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldContract {
    /// Value must carry one of the listed BSON types.
    Typed(&'static [TypeTag]),
    /// Value must be one of the listed strings.
    Enumerated(&'static [&'static str]),
    /// Sub-document whose own properties are constrained.
    Object(Vec<Field>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub contract: FieldContract,
}

impl Field {
    pub fn typed(name: &'static str, tags: &'static [TypeTag]) -> Self {
        Self {
            name,
            contract: FieldContract::Typed(tags),
        }
    }

    pub fn one_of(name: &'static str, values: &'static [&'static str]) -> Self {
        Self {
            name,
            contract: FieldContract::Enumerated(values),
        }
    }

    pub fn object(name: &'static str, fields: Vec<Field>) -> Self {
        Self {
            name,
            contract: FieldContract::Object(fields),
        }
    }

    fn to_json_schema(&self) -> Value {
        match &self.contract {
            FieldContract::Typed(tags) => json!({ "bsonType": bson_type(tags) }),
            FieldContract::Enumerated(values) => json!({ "enum": values }),
            FieldContract::Object(fields) => json!({
                "bsonType": "object",
                "properties": properties(fields),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationSchema {
    pub required: Vec<&'static str>,
    pub fields: Vec<Field>,
}

impl ValidationSchema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Renders the contract as a `{ "$jsonSchema": ... }` collection
    /// validator.
    pub fn to_validator(&self) -> Value {
        json!({
            "$jsonSchema": {
                "bsonType": "object",
                "required": self.required,
                "properties": properties(&self.fields),
            }
        })
    }
}

fn bson_type(tags: &[TypeTag]) -> Value {
    match tags {
        [single] => Value::from(single.as_str()),
        _ => Value::from(
            tags.iter().map(TypeTag::as_str).collect::<Vec<&str>>(),
        ),
    }
}

fn properties(fields: &[Field]) -> Value {
    let mut result = Map::new();

    for field in fields {
        result.insert(field.name.to_string(), field.to_json_schema());
    }

    Value::Object(result)
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub validation: Option<ValidationSchema>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDirection {
    Ascending,
    Descending,
    /// Special index type such as `text`, `hashed` or `2dsphere`.
    Directive(&'static str),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexOptionSet {
    pub name: &'static str,
    pub unique: bool,
    pub sparse: bool,
    pub expire_after_seconds: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub keys: Vec<(&'static str, KeyDirection)>,
    pub options: IndexOptionSet,
}

impl IndexSpec {
    pub fn new(collection: &'static str, name: &'static str) -> Self {
        Self {
            collection,
            keys: vec![],
            options: IndexOptionSet {
                name,
                ..Default::default()
            },
        }
    }

    pub fn asc(mut self, path: &'static str) -> Self {
        self.keys.push((path, KeyDirection::Ascending));
        self
    }

    pub fn desc(mut self, path: &'static str) -> Self {
        self.keys.push((path, KeyDirection::Descending));
        self
    }

    pub fn directive(
        mut self,
        path: &'static str,
        directive: &'static str,
    ) -> Self {
        self.keys.push((path, KeyDirection::Directive(directive)));
        self
    }

    pub fn unique(mut self) -> Self {
        self.options.unique = true;
        self
    }

    pub fn sparse(mut self) -> Self {
        self.options.sparse = true;
        self
    }

    /// Zero means documents expire at the instant stored in the keyed field.
    pub fn expire_after_seconds(mut self, seconds: u64) -> Self {
        self.options.expire_after_seconds = Some(seconds);
        self
    }

    pub fn name(&self) -> &'static str {
        self.options.name
    }

    pub fn key_paths(&self) -> Vec<&'static str> {
        self.keys.iter().map(|(path, _)| *path).collect()
    }
}

/// A collection together with the indexes declared on it.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionDeclaration {
    pub spec: CollectionSpec,
    pub indexes: Vec<IndexSpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    pub collections: Vec<CollectionDeclaration>,
    pub seed: SeedSet,
}

impl Catalog {
    /// The schema shipped with this tool.
    pub fn turbodex() -> Self {
        Self {
            collections: collections::declarations(),
            seed: seed::achievements(),
        }
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionDeclaration> {
        self.collections
            .iter()
            .find(|declaration| declaration.spec.name == name)
    }

    pub fn collection_names(&self) -> Vec<&'static str> {
        self.collections
            .iter()
            .map(|declaration| declaration.spec.name)
            .collect()
    }
}
