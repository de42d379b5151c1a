use quarry::{
    ColumnDef, Datum, FnCodec, Parts, Record, Result, Schema, SchemaOptions, Table, TypeRegistry,
};
use std::sync::Arc;

/// Book identifier, stored as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isbn(pub String);

/// Stored across the `location_city` and `location_country` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn new(city: &str, country: &str) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }
}

pub fn location_codec() -> FnCodec<Location> {
    FnCodec::new(
        |v: &Location| {
            Ok(Parts::new()
                .with("city", v.city.clone())
                .with("country", v.country.clone()))
        },
        |parts: &Parts| {
            Ok(Location {
                city: parts.get("city")?,
                country: parts.get("country")?,
            })
        },
    )
}

/// Default registry plus the types of the library.
pub fn library_registry() -> Result<Arc<TypeRegistry>> {
    let registry = TypeRegistry::with_defaults();
    registry.register_via::<Isbn, String>(|v| Ok(v.0.clone()), |v| Ok(Isbn(v)))?;
    Ok(Arc::new(registry))
}

/// Publishers, authors living somewhere and books written by them.
///
/// ```text
/// publishers (id, name)
/// authors    (id, name, publisher -> publishers.id, location { city, country })
/// books      (id, title, isbn, author -> authors.id, tags)
/// ```
pub fn library_schema() -> Result<Schema> {
    let registry = library_registry()?;
    let mut schema = Schema::new(registry.clone()).with_options(
        SchemaOptions::default().allow_functions(["lower", "upper", "length", "coalesce"]),
    );
    schema.add(
        Table::builder("publishers", &registry)
            .column(ColumnDef::new::<i64>("id").primary_key().autoincrement())
            .column(ColumnDef::new::<String>("name"))
            .build()?,
    );
    schema.add(
        Table::builder("authors", &registry)
            .column(ColumnDef::new::<i64>("id").primary_key().autoincrement())
            .column(ColumnDef::new::<String>("name"))
            .column(ColumnDef::reference::<i64>("publisher", "publishers", "id"))
            .column(
                ColumnDef::virtual_column::<Location>("location", location_codec())
                    .child::<String>("city")
                    .child::<String>("country"),
            )
            .build()?,
    );
    schema.add(
        Table::builder("books", &registry)
            .column(ColumnDef::new::<i64>("id").primary_key().autoincrement())
            .column(ColumnDef::new::<String>("title"))
            .column(ColumnDef::new::<Isbn>("isbn"))
            .column(ColumnDef::reference::<i64>("author", "authors", "id"))
            .column(ColumnDef::list::<String>("tags"))
            .build()?,
    );
    Ok(schema)
}

pub fn book(title: &str, isbn: &str, author: i64, tags: &[&str]) -> Record {
    Record::new()
        .with("title", title.to_string())
        .with("isbn", Isbn(isbn.into()))
        .with("author", author)
        .with("tags", Datum::list(tags.iter().map(|v| v.to_string())))
}
