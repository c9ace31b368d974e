use serde_json::{Value, json};

/// Built-in configuration defaults.
///
/// Keyword lists are matched as lower-case substrings, so local-language entries are stored
/// lower-cased as well.
pub fn default_config() -> Value {
    json!({
        "classify": {
            "gradeKeywords": [
                "score", "grade", "mark", "point",
                "điểm", "diem", "punkte", "puntaje",
                "分数", "成绩", "点数"
            ],
            "sampleRows": 30,
            "numericThreshold": 0.6,
            "minRows": 1
        },
        "chart": {
            "labelKeywords": [
                "id", "name", "student", "họ tên", "tên", "ho ten", "mssv", "sbd",
                "nombre", "nom", "姓名", "名前"
            ],
            "width": 640,
            "height": 400,
            "barPadding": 0.2,
            "tickCount": 5
        },
        "extract": {
            "maxRawBytes": 262144,
            "lenient": true
        },
        "diagram": {
            "maxDepth": 12,
            "maxNodes": 2000,
            "defaultTitle": "Mindmap"
        },
        "layout": {
            "levelSpacing": 260,
            "siblingSpacing": 44,
            "cousinSpacing": 68,
            "margin": 20,
            "canvasHeight": 0,
            "maxNodeWidth": 200,
            "fontSize": 14,
            "nodePadding": 10
        },
        "content": {
            "minChars": 50,
            "maxChars": 20000
        },
        "generation": {
            "timeoutMs": 60000
        },
        "export": {
            "scale": 2.0,
            "background": "white",
            "jpegQuality": 90
        },
        "prompts": {
            "summary": "Summarize the following study material as concise bullet points:\n\n{content}",
            "flashcards": "Create flashcards as a JSON array of {\"q\", \"a\"} objects from the following material:\n\n{content}",
            "qa": "Create a list of questions and answers as a JSON array of {\"q\", \"a\"} objects from the following material:\n\n{content}",
            "mindmap": "Create a mindmap as JSON {\"title\", \"nodes\": [{\"label\", \"children\"}]} from the following material:\n\n{content}"
        }
    })
}
