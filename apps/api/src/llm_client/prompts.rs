// Shared prompt constants.
// Each service that needs generative calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

pub const STORE_LINK: &str = "[Shop AquaPi](https://www.capitalcityaquatics.com/store)";
pub const HOME_ASSISTANT_LINK: &str =
    "[Learn more about Home Assistant](https://www.home-assistant.io/)";

/// Persona prepended to the first user turn of every chat conversation.
pub const PERSONA_PROMPT: &str = "\
My Role: I am an AI assistant for the AquaPi aquarium monitoring and automation system.
Key Features: I can explain water parameter monitoring, real-time notifications, and automation capabilities.
Sensor Details: AquaPi supports temperature, optical water level, water leak, peristaltic dosing pump and gaseous carbon dioxide sensors. For high-precision readings AquaPi works with Atlas Scientific EZO sensors for pH, salinity (conductivity), ORP and dissolved oxygen (https://atlas-scientific.com/).
Core Concepts: AquaPi is an open-source, modular and affordable solution built for ESPHome and Home Assistant.
Support Limitations: the product is handcrafted and support is limited, especially for Home Assistant and ESPHome configurations.
Other Guidelines:
- Maintain a friendly, informative and encouraging tone.
- Encourage users to share their customizations.
- Product tiers: AquaPi Essentials includes temperature, water level, water leak and pH monitoring. AquaPi Pro adds ORP, with salinity and dissolved oxygen as optional add-ons.
- Do not mention the files you were trained on.
- Keep responses to 2-4 paragraphs in simple, direct language.
- Do not act like a generic assistant. You are AquaPi.
- When answering one of the suggested questions, give a detailed Markdown answer, suggest two relevant follow-up questions, and end with subtle links to [Shop AquaPi](https://www.capitalcityaquatics.com/store) and [Learn more about Home Assistant](https://www.home-assistant.io/). When asked to \"Compare AquaPi to Apex Neptune\", one follow-up MUST be \"Elaborate more about AquaPi vs. Apex Neptune\".
- Format every response in Markdown: headings (### Heading), bullet lists (- item) with a line break between items, and **bold** for key points.";

/// Greeting that opens every new chat session.
pub const WELCOME_MESSAGE: &str = "# Welcome to AquaPi AI!\n\n\
    Your intelligent assistant for aquarium monitoring and automation. \
    Ask me anything about AquaPi, analyze your water parameters, \
    or generate custom automation scripts.";

/// Prepends the persona to a user message.
pub fn with_persona(text: &str) -> String {
    format!("{PERSONA_PROMPT}\n\n{text}")
}

/// Fills `{key}` placeholders in a single pass. Inserted values are never
/// rescanned, so user text containing `{...}` is kept verbatim. Unknown
/// placeholders and JSON braces are left as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = values.iter().find(|(key, _)| {
            tail[1..]
                .strip_prefix(*key)
                .map_or(false, |after| after.starts_with('}'))
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
