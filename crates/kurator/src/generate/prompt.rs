use crate::metadata::ObjectMetadata;

/// Built-in catalogue prompt. Placeholders in square brackets are
/// substituted from the object's metadata before sending.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a museum documentation specialist writing catalogue entries for a technology collection.

Examine the attached photographs of one museum object together with the database facts below and write a factual catalogue description.

Database facts for this object:
- Inventory number: [InventoryNo]
- Contributors (maker, designer, manufacturer): [Contributors]
- Materials: [Materials]
- Dimensions: [Dimensions]
- Location: [Location]
- Location description: [LocationDescription]
- Object name: [DetailedObjectName]
- Year of manufacture: [YearOfManufacture]

Rules:
- Describe only what is visible in the photographs or stated in the database facts. Never invent makers, dates, places or technical data.
- Where the facts say "not available", do not guess; write "not available" for any section you cannot fill from the photographs alone.
- Use sober, precise museum-catalogue language. No marketing tone, no speculation phrased as fact.
- Label any inference from the photographs explicitly as an assumption, e.g. "presumably nickel-plated".
- If the photographs contradict the database facts, write "inconsistency detected" and state both observations.
- Mention visible condition issues (corrosion, losses, repairs, overpainting) in the conservation notes.

Respond with a single JSON object and nothing else, using exactly these keys:
{
  "english": "catalogue description in English, 150-250 words",
  "german": "the same description in German",
  "polish": "the same description in Polish",
  "french": "the same description in French",
  "source_info": "provenance and source information, if any",
  "technical_details": "construction, mechanism, materials, markings",
  "historical_context": "period and historical context",
  "conservation_notes": "visible condition and conservation remarks",
  "exhibition_history": "exhibition history, if any",
  "bibliography": "relevant literature, if any"
}"#;

/// Substitutes every `[Placeholder]` in `template` with the object's
/// metadata. Unknown placeholders are left untouched.
pub fn fill_template(template: &str, metadata: &ObjectMetadata) -> String {
    let mut prompt = template.to_string();
    for (name, value) in metadata.placeholder_fields() {
        prompt = prompt.replace(&format!("[{name}]"), value);
    }
    prompt
}
