use eyre::{Result, bail};
use log::debug;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are an assistant that summarizes YouTube transcripts.";

const PROMPT_TEMPLATE: &str = "Please summarize the following YouTube video titled: \"{{title}}\" transcript into 6 bullet points. \
Each bullet point should correspond to a distinct portion of the video (e.g., minute 0-3, minute 3-5, etc.) and highlight the main topic or focus of that segment. \
The format (in markdown) for each bullet point (-) should be the (in bold **) approximate timestamps - (in bold **) summary title : \
(regular font) key points covered in that section in a clear, factual and precise manner \
(and two line breaks between each section using &nbsp; followed by two spaces). \
Sections irrelevant to the main topic like sponsorships can be ignored. Use an emoji at the end of each bullet point summary.";

/// Chat-completion client that turns a formatted transcript into a bullet summary
#[derive(Debug, Clone)]
pub struct SummaryClient {
    client: reqwest::Client,
    model: String,
    temperature: f64,
}

impl SummaryClient {
    pub fn new(client: reqwest::Client, model: impl Into<String>, temperature: f64) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    /// Summarize a transcript produced by `format::format_transcript`
    pub async fn summarize(&self, title: &str, transcript: &str) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| eyre::eyre!("OPENAI_API_KEY environment variable not set (required for summarization)"))?;

        debug!("Summarizing \"{title}\" via OpenAI API with model {}", self.model);

        let body = request_body(&self.model, self.temperature, title, transcript);

        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("OpenAI API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        extract_openai_text(&json)
    }
}

fn build_prompt(title: &str) -> String {
    PROMPT_TEMPLATE.replace("{{title}}", title)
}

fn request_body(model: &str, temperature: f64, title: &str, transcript: &str) -> serde_json::Value {
    let user_message = format!("{}\n\n{transcript}", build_prompt(title));

    serde_json::json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": SYSTEM_PROMPT
            },
            {
                "role": "user",
                "content": user_message
            }
        ],
        "temperature": temperature
    })
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
    {
        return Ok(text.to_string());
    }
    bail!("unexpected OpenAI API response format");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_inserts_title() {
        let prompt = build_prompt("Rust in 100 Seconds");
        assert!(prompt.starts_with("Please summarize the following YouTube video titled: \"Rust in 100 Seconds\" transcript"));
        assert!(!prompt.contains("{{title}}"));
    }

    #[test]
    fn test_request_body() {
        let transcript = "Start: 0:00, Duration: 0:03, Text: Hello";
        let body = request_body(DEFAULT_MODEL, DEFAULT_TEMPERATURE, "Greeting", transcript);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);

        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("titled: \"Greeting\""));
        assert!(user.ends_with("\n\nStart: 0:00, Duration: 0:03, Text: Hello"));
    }

    #[test]
    fn test_extract_openai_text() {
        let json = serde_json::json!({
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": "- **0:00 - 0:03** - **Greeting** : hello 👋"
                    }
                }
            ]
        });
        assert_eq!(
            extract_openai_text(&json).unwrap(),
            "- **0:00 - 0:03** - **Greeting** : hello 👋"
        );
    }

    #[test]
    fn test_extract_openai_text_empty() {
        let json = serde_json::json!({"choices": []});
        assert!(extract_openai_text(&json).is_err());
    }
}
