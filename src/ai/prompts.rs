use serde_json::Value;

/// Everything the model needs to edit a schema/uiSchema/formData triple.
///
/// The completion API has no memory between calls, so each prompt carries
/// the full editable state plus the last-saved snapshot for comparison.
/// Fields the caller does not have render as explicit placeholders instead
/// of being omitted, so the model always sees a complete context block.
#[derive(Debug, Clone)]
pub struct SchemaEditContext {
    pub command: String,
    pub target: String,
    pub schema: Value,
    pub ui_schema: Value,
    pub form_data: Value,
    pub rules: Vec<String>,
    pub current_functions: String,
    pub current_semantic_schema: String,
    pub current_rule_set: Vec<String>,
    pub last_semantic_schema: String,
    pub last_rule_set: Vec<String>,
    pub last_data_schema: String,
    pub last_ui_schema: String,
    pub last_js_function_impl: String,
}

impl Default for SchemaEditContext {
    fn default() -> Self {
        Self {
            command: String::new(),
            target: String::new(),
            schema: Value::Object(Default::default()),
            ui_schema: Value::Object(Default::default()),
            form_data: Value::Object(Default::default()),
            rules: Vec::new(),
            current_functions: String::new(),
            current_semantic_schema: String::new(),
            current_rule_set: Vec::new(),
            last_semantic_schema: String::new(),
            last_rule_set: Vec::new(),
            last_data_schema: "{}".to_string(),
            last_ui_schema: "{}".to_string(),
            last_js_function_impl: String::new(),
        }
    }
}

/// Instruction text for a raw JSON document edit. The command and the
/// document are embedded verbatim.
pub fn build_json_edit_prompt(command: &str, json_data: &str) -> String {
    format!(
        r#"You are a JSON modification assistant. Given a command and JSON data, return ONLY the modified JSON object. Do not include any explanations, markdown formatting, or additional text. Just return the raw JSON.

Command: {command}

Current JSON:
{json_data}

Modified JSON:"#
    )
}

/// Instruction text for a schema-triple edit.
///
/// Section order is fixed: command, current-input context, last-saved
/// context, rules to enforce (only when rules exist), then the working
/// structures and the mandated return shape. Rules take precedence over
/// the command when they conflict.
pub fn build_schema_edit_prompt(ctx: &SchemaEditContext) -> String {
    let rules_block = if ctx.rules.is_empty() {
        String::new()
    } else {
        let listed = ctx
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| format!("{}. {}", index + 1, rule))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "\nIMPORTANT RULES TO ENFORCE:\n{listed}\n\n\
             You MUST ensure that ALL modifications comply with these rules. \
             If a command conflicts with a rule, prioritize the rule and modify \
             the command accordingly. Apply these rules when creating or \
             modifying any schema properties, UI configurations, or form data.\n"
        )
    };

    let functions_block = if ctx.current_functions.is_empty() {
        "No JavaScript functions currently exist.".to_string()
    } else {
        format!("Current JavaScript Functions:\n{}", ctx.current_functions)
    };

    let rules_reminder = if ctx.rules.is_empty() {
        ""
    } else {
        "ENSURE ALL RULES ARE SATISFIED in your response. Check each rule against your modifications before returning the result."
    };

    format!(
        r#"You are a React JSON Schema Form assistant. Given a command and current schemas, return the COMPLETE, FULL JSON objects with modifications applied. NEVER return partial objects - always return the complete schema/data with all existing fields preserved and only the requested changes applied.

You must ALWAYS analyze and return ALL THREE: schema, uiSchema, and formData - even if the command seems to target only one. Consider how changes affect all three schemas.

Command: {command}

CONTEXT - You have access to both current working state and last saved state:

CURRENT USER INPUT (what caused this AI call):
- Semantic Schema: {current_semantic_schema}
- Rule Set: {current_rule_set}

LAST SAVED STATE FROM DATABASE (for comparison):
- Last Semantic Schema: {last_semantic_schema}
- Last Rule Set: {last_rule_set}
- Last Data Schema: {last_data_schema}
- Last UI Schema: {last_ui_schema}
- Last JS Functions: {last_js_functions}

{rules_block}
CURRENT WORKING SCHEMAS (what user is editing now):
JSON Schema:
{schema}

UI Schema:
{ui_schema}

Form Data:
{form_data}

{functions_block}

CRITICAL: Return the result as a JSON object with keys: schema, uiSchema, formData, and jsFunctions. Each returned object MUST be the complete object with ALL existing fields preserved plus your modifications.

FOR COMPLEX RULES that require dynamic behavior (like "if age > 75, remove bio field"), you MUST generate JavaScript functions in the jsFunctions field. These functions should:
1. Listen for form field changes
2. Implement the rule logic
3. Dynamically modify the form schema/data
4. Use function names like: applyRule1, applyRule2, etc.

Simple validation rules go in the JSON schema. Complex conditional rules become JavaScript functions.

{rules_reminder}

Return format:
{{
  "schema": {{complete schema with all properties}},
  "uiSchema": {{complete uiSchema with all properties}},
  "formData": {{complete formData with all properties}},
  "jsFunctions": "// Generated JavaScript functions for complex rules\nfunction applyRule1(formData, updateForm) {{\n  // Rule implementation\n}}"
}}"#,
        command = ctx.command,
        current_semantic_schema = or_placeholder(&ctx.current_semantic_schema, "Not provided"),
        current_rule_set = join_or_placeholder(&ctx.current_rule_set, "No current rules"),
        last_semantic_schema = or_placeholder(&ctx.last_semantic_schema, "Not saved yet"),
        last_rule_set = join_or_placeholder(&ctx.last_rule_set, "No saved rules"),
        last_data_schema = ctx.last_data_schema,
        last_ui_schema = ctx.last_ui_schema,
        last_js_functions = or_placeholder(&ctx.last_js_function_impl, "No functions saved"),
        rules_block = rules_block,
        schema = pretty(&ctx.schema),
        ui_schema = pretty(&ctx.ui_schema),
        form_data = pretty(&ctx.form_data),
        functions_block = functions_block,
        rules_reminder = rules_reminder,
    )
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() { placeholder } else { value }
}

fn join_or_placeholder(items: &[String], placeholder: &str) -> String {
    if items.is_empty() {
        placeholder.to_string()
    } else {
        items.join(", ")
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_edit_prompt_embeds_command_and_document_verbatim() {
        let prompt = build_json_edit_prompt("add a field called age", "{\"name\":\"Alice\"}");
        assert!(prompt.contains("Command: add a field called age"));
        assert!(prompt.contains("Current JSON:\n{\"name\":\"Alice\"}"));
        assert!(prompt.contains("return ONLY the modified JSON object"));
        assert!(prompt.ends_with("Modified JSON:"));
    }

    #[test]
    fn schema_prompt_renders_placeholders_for_absent_context() {
        let ctx = SchemaEditContext {
            command: "add an email field".to_string(),
            ..Default::default()
        };
        let prompt = build_schema_edit_prompt(&ctx);

        assert!(prompt.contains("- Semantic Schema: Not provided"));
        assert!(prompt.contains("- Rule Set: No current rules"));
        assert!(prompt.contains("- Last Semantic Schema: Not saved yet"));
        assert!(prompt.contains("- Last Rule Set: No saved rules"));
        assert!(prompt.contains("- Last Data Schema: {}"));
        assert!(prompt.contains("- Last UI Schema: {}"));
        assert!(prompt.contains("- Last JS Functions: No functions saved"));
        assert!(prompt.contains("No JavaScript functions currently exist."));
        assert!(!prompt.contains("IMPORTANT RULES TO ENFORCE"));
        assert!(!prompt.contains("ENSURE ALL RULES ARE SATISFIED"));
    }

    #[test]
    fn schema_prompt_enumerates_rules_in_input_order() {
        let ctx = SchemaEditContext {
            command: "add an age field".to_string(),
            rules: vec![
                "age must be at least 18".to_string(),
                "every field needs a description".to_string(),
            ],
            ..Default::default()
        };
        let prompt = build_schema_edit_prompt(&ctx);

        let first = prompt.find("1. age must be at least 18").unwrap();
        let second = prompt.find("2. every field needs a description").unwrap();
        assert!(first < second);
        assert!(prompt.contains("prioritize the rule"));
        assert!(prompt.contains("ENSURE ALL RULES ARE SATISFIED"));
    }

    #[test]
    fn schema_prompt_pretty_prints_working_structures() {
        let ctx = SchemaEditContext {
            command: "rename the title".to_string(),
            schema: json!({"type": "object", "properties": {"name": {"type": "string"}}}),
            ui_schema: json!({"name": {"ui:widget": "text"}}),
            form_data: json!({"name": "Alice"}),
            ..Default::default()
        };
        let prompt = build_schema_edit_prompt(&ctx);

        assert!(prompt.contains("\"type\": \"object\""));
        assert!(prompt.contains("\"ui:widget\": \"text\""));
        assert!(prompt.contains("\"name\": \"Alice\""));
    }

    #[test]
    fn schema_prompt_mandates_the_four_key_return_shape() {
        let prompt = build_schema_edit_prompt(&SchemaEditContext {
            command: "anything".to_string(),
            ..Default::default()
        });

        assert!(prompt.contains("keys: schema, uiSchema, formData, and jsFunctions"));
        assert!(prompt.contains("applyRule1, applyRule2"));
        assert!(prompt.contains("Simple validation rules go in the JSON schema."));
    }

    #[test]
    fn schema_prompt_carries_current_functions_when_present() {
        let ctx = SchemaEditContext {
            command: "tighten rule 1".to_string(),
            current_functions: "function applyRule1(formData, updateForm) {}".to_string(),
            current_rule_set: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };
        let prompt = build_schema_edit_prompt(&ctx);

        assert!(prompt.contains(
            "Current JavaScript Functions:\nfunction applyRule1(formData, updateForm) {}"
        ));
        assert!(prompt.contains("- Rule Set: a, b"));
        assert!(!prompt.contains("No JavaScript functions currently exist."));
    }
}
