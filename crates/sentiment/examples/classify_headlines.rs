//! 对比两种分类器在同一组标题上的结果
//!
//! cargo run -p sentiment --example classify_headlines

use sentiment::{
    aggregate, score_text, LexiconClassifier, ModelClassifier, ModelSource, SentimentClassifier,
};

fn main() {
    let headlines = [
        "Cramer's Lighting Round: Don't buy Fiserv",
        "Fiserv's lone bear sounded alarm long before stock's plunge",
        "Fiserv attracted hot money ahead of 44% stock-price nosedive",
        "Fiserv stock craters 44%, on pace for worst day ever after company slashes guidance",
    ];

    let lexicon = LexiconClassifier::new();
    let model = ModelClassifier::shared(ModelSource::Embedded);
    let classifiers: [&dyn SentimentClassifier; 2] = [&lexicon, &model];

    for classifier in classifiers {
        println!("=== {} ===", classifier.name());
        let labels: Vec<_> = headlines
            .iter()
            .map(|headline| {
                let label = score_text(classifier, headline);
                println!("{:>8}: {}", label.as_str().to_uppercase(), headline);
                label
            })
            .collect();
        println!("vendor sentiment: {}\n", aggregate(&labels));
    }

    println!("lexicon compound for first headline: {:.3}", lexicon.polarity(headlines[0]));
}
