pub mod bert;
pub mod distilbert;
pub mod modernbert;
pub mod roberta;

pub use bert::BertForSequenceClassification;
pub use distilbert::DistilBertForSequenceClassification;
pub use modernbert::ModernBertForSequenceClassification;
pub use roberta::RobertaForSequenceClassification;
