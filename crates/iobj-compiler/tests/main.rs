mod documents;
mod schema;
mod values;
