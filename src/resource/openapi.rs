//! OpenAPI fragment generated from a table schema.

use serde_json::{json, Map, Value};
use shelf_authz::{AccessPolicy, Action, Requirement};
use shelf_db::{Column, ColumnKind, Lookup, TableSchema};

use super::params;

fn column_schema(column: &Column) -> Value {
    let mut schema = match column.kind {
        ColumnKind::Id | ColumnKind::Integer => json!({ "type": "integer" }),
        ColumnKind::Reference { table } => json!({
            "type": "integer",
            "description": format!("id of a row in {table}")
        }),
        ColumnKind::Text { max_length } => match max_length {
            Some(max) => json!({ "type": "string", "maxLength": max }),
            None => json!({ "type": "string" }),
        },
        ColumnKind::Decimal {
            max_digits,
            decimal_places,
        } => json!({
            "type": "string",
            "format": "decimal",
            "description": format!("up to {max_digits} digits, {decimal_places} after the point")
        }),
        ColumnKind::Date => json!({ "type": "string", "format": "date" }),
        ColumnKind::Timestamp => json!({ "type": "string", "format": "date-time" }),
    };
    if let Some(min) = column.min_value {
        if matches!(column.kind, ColumnKind::Integer) {
            schema["minimum"] = json!(min);
        }
    }
    if !column.is_writable() {
        schema["readOnly"] = json!(true);
    }
    schema
}

/// Output record: every column plus nested children.
fn record_schema(schema: &TableSchema) -> Value {
    let mut properties = Map::new();
    for column in schema.columns {
        properties.insert(column.name.to_string(), column_schema(column));
    }
    for relation in schema.children {
        properties.insert(
            relation.name.to_string(),
            json!({
                "type": "array",
                "readOnly": true,
                "items": { "$ref": format!("#/components/schemas/{}", relation.schema.component_name()) }
            }),
        );
    }
    let required: Vec<&str> = schema
        .columns
        .iter()
        .filter(|c| c.required || !c.is_writable())
        .map(|c| c.name)
        .collect();
    json!({ "type": "object", "properties": properties, "required": required })
}

/// Request body: writable columns only.
fn input_schema(schema: &TableSchema) -> Value {
    let mut properties = Map::new();
    for column in schema.writable_columns() {
        let mut prop = column_schema(column);
        if !column.required {
            prop["nullable"] = json!(true);
        }
        properties.insert(column.name.to_string(), prop);
    }
    let required: Vec<&str> = schema
        .writable_columns()
        .filter(|c| c.required && c.default.is_none())
        .map(|c| c.name)
        .collect();
    json!({ "type": "object", "properties": properties, "required": required })
}

fn query_parameters(schema: &TableSchema) -> Vec<Value> {
    let mut parameters = Vec::new();
    for column in schema.columns {
        for lookup in Lookup::for_kind(column.kind) {
            let name = match lookup {
                Lookup::Exact => column.name.to_string(),
                other => format!("{}__{}", column.name, other.as_str()),
            };
            parameters.push(json!({
                "name": name,
                "in": "query",
                "required": false,
                "schema": { "type": "string" }
            }));
        }
    }

    let searched = !schema.search.is_empty();
    for (name, description, present) in [
        (params::SEARCH, "Terms separated by spaces or commas", searched),
        (params::ORDERING, "Comma-separated fields, `-` for descending", true),
        (params::LIMIT, "Maximum number of records", true),
        (params::OFFSET, "Number of records to skip", true),
    ] {
        if present {
            parameters.push(json!({
                "name": name,
                "in": "query",
                "required": false,
                "description": description,
                "schema": { "type": "string" }
            }));
        }
    }
    parameters
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        }
    })
}

fn operation(
    schema: &TableSchema,
    policy: &AccessPolicy,
    action: Action,
    summary: String,
    success: (&str, Value),
) -> Value {
    let tag = schema.component_name();
    let mut responses = Map::new();
    responses.insert(success.0.to_string(), success.1);

    if matches!(action, Action::Retrieve | Action::Update | Action::Delete) {
        responses.insert("404".into(), error_response("Not found"));
    }
    if matches!(action, Action::List | Action::Create | Action::Update) {
        responses.insert("400".into(), error_response("Validation error"));
    }

    let mut op = json!({ "summary": summary, "tags": [tag] });
    match policy.requirement(action) {
        Requirement::Anyone => {}
        requirement => {
            responses.insert("401".into(), error_response("Authentication required"));
            if matches!(requirement, Requirement::AtLeast(_)) {
                responses.insert("403".into(), error_response("Role too low"));
            }
            op["security"] = json!([{ "bearer": [] }]);
        }
    }
    op["responses"] = Value::Object(responses);
    op
}

/// Paths are relative to the module mount point.
pub fn fragment(schema: &TableSchema, policy: &AccessPolicy) -> Value {
    let component = schema.component_name();
    let input = format!("{component}Input");
    let record_ref = json!({ "$ref": format!("#/components/schemas/{component}") });
    let body = json!({
        "required": true,
        "content": { "application/json": { "schema": { "$ref": format!("#/components/schemas/{input}") } } }
    });
    let record_response = |description: &str| {
        json!({
            "description": description,
            "content": { "application/json": { "schema": record_ref.clone() } }
        })
    };
    let id_parameter = json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer" }
    }]);

    let mut list = operation(
        schema,
        policy,
        Action::List,
        format!("List {}", schema.name),
        (
            "200",
            json!({
                "description": "Matching records",
                "content": { "application/json": { "schema": { "type": "array", "items": record_ref.clone() } } }
            }),
        ),
    );
    list["parameters"] = Value::Array(query_parameters(schema));

    let mut create = operation(
        schema,
        policy,
        Action::Create,
        format!("Create a {}", schema.label),
        ("201", record_response("Created")),
    );
    create["requestBody"] = body.clone();

    let retrieve = operation(
        schema,
        policy,
        Action::Retrieve,
        format!("Retrieve a {}", schema.label),
        ("200", record_response("The record")),
    );
    let mut replace = operation(
        schema,
        policy,
        Action::Update,
        format!("Replace a {}", schema.label),
        ("200", record_response("Updated")),
    );
    replace["requestBody"] = body.clone();
    let mut patch = operation(
        schema,
        policy,
        Action::Update,
        format!("Partially update a {}", schema.label),
        ("200", record_response("Updated")),
    );
    patch["requestBody"] = body;
    let delete = operation(
        schema,
        policy,
        Action::Delete,
        format!("Delete a {}", schema.label),
        ("204", json!({ "description": "Deleted" })),
    );

    let mut schemas = Map::new();
    schemas.insert(component.clone(), record_schema(schema));
    schemas.insert(input, input_schema(schema));
    for relation in schema.children {
        schemas.insert(
            relation.schema.component_name(),
            record_schema(relation.schema),
        );
    }

    json!({
        "paths": {
            "/": { "get": list, "post": create },
            "/{id}": {
                "parameters": id_parameter,
                "get": retrieve,
                "put": replace,
                "patch": patch,
                "delete": delete
            }
        },
        "components": { "schemas": schemas }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_db::{Column, Relation, SearchField};

    static NOTES: TableSchema = TableSchema {
        name: "notes",
        label: "note",
        columns: &[
            Column::id(),
            Column::varchar("title", 20).required(),
            Column::actor("author"),
            Column::created_at("created_at"),
        ],
        search: &[SearchField::Column("title")],
        ordering: &["-created_at"],
        children: &[] as &[Relation],
    };

    #[test]
    fn fragment_documents_every_endpoint() {
        let doc = fragment(&NOTES, &AccessPolicy::editorial());
        let paths = &doc["paths"];
        for (path, method) in [
            ("/", "get"),
            ("/", "post"),
            ("/{id}", "get"),
            ("/{id}", "put"),
            ("/{id}", "patch"),
            ("/{id}", "delete"),
        ] {
            assert!(paths[path][method].is_object(), "{method} {path}");
        }
        assert!(paths["/"]["get"]["security"].is_null());
        assert!(paths["/{id}"]["delete"]["responses"]["403"].is_object());
    }

    #[test]
    fn input_schema_omits_server_owned_columns() {
        let doc = fragment(&NOTES, &AccessPolicy::editorial());
        let input = &doc["components"]["schemas"]["NoteInput"];
        let properties = input["properties"].as_object().unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), ["title"]);
        assert_eq!(input["required"], json!(["title"]));

        let record = &doc["components"]["schemas"]["Note"];
        assert_eq!(record["properties"]["author"]["readOnly"], json!(true));
    }

    #[test]
    fn list_parameters_cover_lookups() {
        let doc = fragment(&NOTES, &AccessPolicy::editorial());
        let names: Vec<_> = doc["paths"]["/"]["get"]["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert!(names.contains(&"title__icontains"));
        assert!(names.contains(&"created_at__gte"));
        assert!(names.contains(&"search"));
        assert!(!names.contains(&"title__gte"));
    }
}
