use airline_sentiment::Sentiment;
use console::{style, StyledObject};

pub fn success(msg: &str) -> String {
    style(msg).green().to_string()
}

pub fn warn(msg: &str) -> String {
    style(msg).yellow().to_string()
}

pub fn error(msg: &str) -> String {
    style(msg).red().to_string()
}

/// Green positive, red negative, yellow for everything else.
pub fn sentiment(sentiment: &Sentiment) -> StyledObject<&str> {
    let styled = style(sentiment.as_str()).bold();
    match sentiment {
        Sentiment::Positive => styled.green(),
        Sentiment::Negative => styled.red(),
        _ => styled.yellow(),
    }
}
