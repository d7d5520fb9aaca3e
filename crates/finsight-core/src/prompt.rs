use serde_json::{json, Value};

use crate::dataset::Dataset;

/// Build the fixed system instruction sent with every request.
///
/// The dataset is embedded as compact JSON so the model answers from these
/// figures only.
pub fn system_instruction(dataset: &Dataset) -> String {
    // Serializing plain numbers and strings cannot fail
    let data_json = dataset.to_json().unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::new();

    prompt.push_str("You are FinSight, an expert financial analyst chatbot.\n");
    prompt.push_str(&format!(
        "You have access to the following quarterly financial data for the {}:\n",
        dataset.fiscal_year_label()
    ));
    prompt.push_str(&data_json);
    prompt.push_str("\n\n");

    prompt.push_str("Your goal is to answer user questions concisely based *only* on this data.\n");
    prompt.push_str("If the user asks about trends, comparisons, or specific metrics over time, ");
    prompt.push_str("you MUST recommend a visualization by setting 'showChart' to true in the JSON response.\n\n");

    prompt.push_str("Return your response in the following JSON format:\n");
    prompt.push_str("{\n");
    prompt.push_str("  \"answer\": \"The text response to the user.\",\n");
    prompt.push_str("  \"showChart\": boolean, // true if a chart would help visualize the answer\n");
    prompt.push_str("  \"chartType\": \"bar\" | \"line\" | \"area\", // best chart type for the data\n");
    prompt.push_str("  \"chartTitle\": \"Title of the chart\",\n");
    prompt.push_str("  \"chartData\": [ { \"name\": \"Q1 2023\", \"value\": 1200000 }, ... ] ");
    prompt.push_str("// The data points to plot. 'name' should be the period, 'value' the metric.\n");
    prompt.push_str("}\n");
    prompt.push_str("Respond with that single JSON object and nothing else.");

    prompt
}

/// The response shape as a structured-output schema.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "answer": { "type": "STRING" },
            "showChart": { "type": "BOOLEAN" },
            "chartType": { "type": "STRING", "enum": ["bar", "line", "area"] },
            "chartTitle": { "type": "STRING" },
            "chartData": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "value": { "type": "NUMBER" }
                    },
                    "required": ["name", "value"]
                }
            }
        },
        "required": ["answer", "showChart"]
    })
}
