//! Prompt construction and the structured response schema.
//!
//! The provider is asked for a JSON object constrained to the
//! `HotelRecord` field set; every field is required so a response can
//! never be partially populated.

use serde_json::{json, Value};

use crate::provider::GenerationRequest;

/// System instruction sent with every generation request.
pub const SYSTEM_PROMPT: &str = "You are a hotel data researcher. You produce accurate, \
verifiable structured metadata for hotels. You answer only with the requested JSON object. \
German text uses Swiss High German orthography: write 'ss' instead of 'ß' throughout.";

/// Build the user prompt embedding the task inputs.
pub fn build_user_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "Research the hotel '{}' in {}",
        request.hotel_name, request.country
    );
    if let Some(city) = request.city.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!(" ({})", city));
    }
    prompt.push_str(".\n\n");

    if let Some(external_id) = request
        .external_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
    {
        prompt.push_str(&format!(
            "The authoritative external identifier for this hotel is '{}'. \
Echo it back unchanged in the external_id field; do not derive a different one.\n",
            external_id
        ));
    } else {
        prompt.push_str(
            "Determine the hotel's external identifier code (GIATA or equivalent). \
If no code can be determined, set external_id to an empty string.\n",
        );
    }

    let urls: Vec<&str> = request
        .source_urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect();
    if !urls.is_empty() {
        prompt.push_str("Prefer these sources for the description content:\n");
        for url in urls {
            prompt.push_str(&format!("- {}\n", url));
        }
    }

    prompt.push_str(
        "\nReturn the full street address, postal code, locality, international phone number \
and coordinates in decimal degrees. Write description_de as a German hotel description of \
200 to 300 words and description_en as a faithful English translation of it.",
    );
    prompt
}

/// JSON schema constraining the structured response. All properties are
/// required and additional properties are rejected by the provider.
pub fn response_schema() -> Value {
    json!({
        "name": "hotel_record",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "country": { "type": "string" },
                "hotel_name": { "type": "string" },
                "external_id": { "type": "string" },
                "street": { "type": "string" },
                "postal_code": { "type": "string" },
                "city": { "type": "string" },
                "phone": { "type": "string" },
                "latitude": { "type": "number" },
                "longitude": { "type": "number" },
                "description_de": { "type": "string" },
                "description_en": { "type": "string" }
            },
            "required": [
                "country", "hotel_name", "external_id", "street", "postal_code",
                "city", "phone", "latitude", "longitude",
                "description_de", "description_en"
            ],
            "additionalProperties": false
        }
    })
}
