use blotter_core::error::BlotterError;
use blotter_core::DocumentRecords;
use serde_json::Value;

/// One file prints its `DocumentRecords`; a batch prints an array of them,
/// each tagged with its document id.
pub fn print(documents: &[(String, DocumentRecords)], single: bool) -> Result<(), BlotterError> {
    let json = serde_json::to_string_pretty(&to_value(documents, single)?)?;
    println!("{json}");
    Ok(())
}

fn to_value(
    documents: &[(String, DocumentRecords)],
    single: bool,
) -> Result<Value, BlotterError> {
    if single {
        if let Some((_, doc)) = documents.first() {
            return Ok(serde_json::to_value(doc)?);
        }
    }

    let mut out = Vec::with_capacity(documents.len());
    for (document_id, doc) in documents {
        let mut value = serde_json::to_value(doc)?;
        if let Value::Object(map) = &mut value {
            map.insert("document".to_string(), Value::String(document_id.clone()));
        }
        out.push(value);
    }
    Ok(Value::Array(out))
}
