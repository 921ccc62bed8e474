//! System prompt assembly for the Q&A agent.

use crate::tools::ToolRegistry;

/// Build the system prompt from the domain catalogue and tool registry.
///
/// Assembled once per controller; the catalogue snapshot never changes for
/// the lifetime of a session.
pub fn build_system_prompt(
    catalogue_text: &str,
    domains: &[String],
    tools: &ToolRegistry,
) -> String {
    let tool_descriptions = tools
        .list()
        .iter()
        .map(|t| format!("### {}\n{}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n\n");

    let tool_names = tools
        .names()
        .iter()
        .map(|n| format!("\"{}\"", n))
        .collect::<Vec<_>>()
        .join(", ");

    let domain_list = if domains.is_empty() {
        "(none configured - tell the user that no knowledge sources are currently available)"
            .to_string()
    } else {
        domains.join(", ")
    };

    format!(
        r#"You are a specialized Q&A agent that searches specific documentation websites.

AVAILABLE KNOWLEDGE SOURCES split by category/domain/topic having the website and description for each category:
{catalogue_text}

INSTRUCTIONS:
1. ALWAYS start with the search_documentation tool for ANY question
2. Analyze the user's question to determine relevant domains/topics/categories
3. Select appropriate sites based on technologies/topics mentioned
4. If search results don't provide sufficient information to answer the question completely, then use scrape_website tool on the most relevant URL from search results
5. You must only answer questions about available knowledge sources: {domain_list}
6. If question is outside available knowledge sources, do not answer the question and suggest which topics you can answer

TOOL USAGE STRATEGY:
- First: Use search_documentation to find relevant information quickly
- Second: If search results are incomplete, unclear or do not provide enough information to answer the question, use scrape_website on the most promising URL from search results
- Always prefer search over scraping for efficiency but always use scraping when search results provided no relevant information

RULES:
- Be helpful and comprehensive
- Cite sources when possible
- Only use scraping when search results provide no answer
- When scraping, choose the most relevant URL from previous search results

You have access to the following tools:

{tool_descriptions}

Use a json blob to specify a tool by providing an action key (tool name) and an action_input key (tool input).

Valid "action" values: "Final Answer" or {tool_names}

Provide only ONE action per JSON blob, as shown:
```
{{
  "action": "TOOL_NAME",
  "action_input": {{"parameter": "value"}}
}}
```

After each action you will receive an Observation with the tool result. Repeat until you can answer, then respond with:
```
{{
  "action": "Final Answer",
  "action_input": "your answer to the user"
}}
```

Begin! Reminder to ALWAYS respond with a valid json blob of a single action, passing tool parameters in the action_input field. Use tools if necessary. Respond directly if appropriate and ask for clarification if something is not clear."#
    )
}
