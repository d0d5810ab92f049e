//! Canned bilingual replies used by the local fallback.
//!
//! Every lookup is an exhaustive match over `(Language, Category)`, so a
//! missing translation is a compile error rather than a runtime gap.

use counselor_core::{Category, Language};

/// Static reply table keyed by language and category.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseCatalog;

impl ResponseCatalog {
    /// Canned reply for a category in the given language.
    pub fn lookup(language: Language, category: Category) -> &'static str {
        match (language, category) {
            (Language::En, Category::Academic) => {
                "I understand you're facing academic challenges. Can you tell me more about what specific subjects or topics you're struggling with?"
            }
            (Language::En, Category::Career) => {
                "Career planning is important! What are your interests and what field are you considering for your future?"
            }
            (Language::En, Category::MentalHealth) => {
                "Your mental health matters. I'm here to listen. Would you like to talk about what's been bothering you?"
            }
            (Language::En, Category::StudyTips) => {
                "Here are some effective study tips: 1) Create a schedule 2) Take regular breaks 3) Find a quiet study space 4) Use active learning techniques. Which area would you like more help with?"
            }
            (Language::En, Category::Default) => {
                "I'm here to help you with academic, career, or personal concerns. What would you like to discuss?"
            }
            (Language::Hi, Category::Academic) => {
                "मैं समझ सकता हूं कि आप शैक्षणिक चुनौतियों का सामना कर रहे हैं। क्या आप मुझे बता सकते हैं कि आपको कौन से विषयों में कठिनाई हो रही है?"
            }
            (Language::Hi, Category::Career) => {
                "करियर प्लानिंग महत्वपूर्ण है! आपकी रुचियां क्या हैं और आप भविष्य के लिए किस क्षेत्र पर विचार कर रहे हैं?"
            }
            (Language::Hi, Category::MentalHealth) => {
                "आपका मानसिक स्वास्थ्य महत्वपूर्ण है। मैं यहां सुनने के लिए हूं। क्या आप इस बारे में बात करना चाहते हैं कि आपको क्या परेशान कर रहा है?"
            }
            (Language::Hi, Category::StudyTips) => {
                "यहां कुछ प्रभावी अध्ययन टिप्स हैं: 1) एक शेड्यूल बनाएं 2) नियमित ब्रेक लें 3) एक शांत अध्ययन स्थान खोजें 4) सक्रिय शिक्षण तकनीकों का उपयोग करें। आपको किस क्षेत्र में अधिक मदद चाहिए?"
            }
            (Language::Hi, Category::Default) => {
                "मैं आपकी शैक्षणिक, करियर या व्यक्तिगत चिंताओं में मदद करने के लिए यहां हूं। आप क्या चर्चा करना चाहते हैं?"
            }
        }
    }

    /// Opening line used to seed a new conversation.
    pub fn greeting(language: Language) -> &'static str {
        match language {
            Language::En => "Hello! I'm your AI counselor. How can I help you today?",
            Language::Hi => "नमस्ते! मैं आपका AI परामर्शदाता हूं। आज मैं आपकी कैसे मदद कर सकता हूं?",
        }
    }

    /// Hint shown in the empty input box.
    pub fn placeholder(language: Language) -> &'static str {
        match language {
            Language::En => "Type your message...",
            Language::Hi => "अपना संदेश लिखें...",
        }
    }

    /// Text submitted when a quick support topic is chosen.
    pub fn quick_prompt(category: Category) -> String {
        format!("I need help with {}", category.label().to_lowercase())
    }
}
