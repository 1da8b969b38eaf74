use assess_core::model::{Difficulty, Domain, OPTION_COUNT, QuestionDraft};

type Template = (&'static str, [&'static str; OPTION_COUNT], i64, Domain, Difficulty);

const TEMPLATES: &[Template] = &[
    // Programmer
    (
        "What is the time complexity of binary search?",
        ["O(n)", "O(log n)", "O(n log n)", "O(1)"],
        2,
        Domain::Programmer,
        Difficulty::Medium,
    ),
    (
        "Which data structure follows LIFO principle?",
        ["Queue", "Stack", "Array", "Linked List"],
        2,
        Domain::Programmer,
        Difficulty::Easy,
    ),
    (
        "Which of the following is a mutable data type in Python?",
        ["Tuple", "String", "List", "Integer"],
        3,
        Domain::Programmer,
        Difficulty::Easy,
    ),
    (
        "What does HTML stand for?",
        [
            "Hyper Text Markup Language",
            "High Tech Modern Language",
            "Hyper Transfer Mark Language",
            "Home Tool Markup Language",
        ],
        1,
        Domain::Programmer,
        Difficulty::Easy,
    ),
    (
        "Which symbol is used for comments in Python?",
        ["//", "/* */", "#", "--"],
        3,
        Domain::Programmer,
        Difficulty::Easy,
    ),
    (
        "What is the time complexity of accessing an element in an array by index?",
        ["O(n)", "O(1)", "O(log n)", "O(n^2)"],
        2,
        Domain::Programmer,
        Difficulty::Medium,
    ),
    (
        "Which keyword is used to define a function in JavaScript?",
        ["def", "func", "function", "method"],
        3,
        Domain::Programmer,
        Difficulty::Easy,
    ),
    // Analytics
    (
        "What does SQL stand for?",
        [
            "Structured Query Language",
            "Simple Query Language",
            "System Query Language",
            "Standard Query Language",
        ],
        1,
        Domain::Analytics,
        Difficulty::Easy,
    ),
    (
        "Which SQL clause is used to filter records?",
        ["GROUP BY", "ORDER BY", "WHERE", "LIMIT"],
        3,
        Domain::Analytics,
        Difficulty::Easy,
    ),
    (
        "What type of chart is best for showing trends over time?",
        ["Pie Chart", "Bar Chart", "Line Chart", "Scatter Plot"],
        3,
        Domain::Analytics,
        Difficulty::Easy,
    ),
    (
        "In statistics, what is the 'mean'?",
        [
            "The middle value",
            "The most frequent value",
            "The average value",
            "The highest value",
        ],
        3,
        Domain::Analytics,
        Difficulty::Easy,
    ),
    (
        "Which Python library is primarily used for data manipulation?",
        ["Matplotlib", "Pandas", "Flask", "PyGame"],
        2,
        Domain::Analytics,
        Difficulty::Medium,
    ),
    (
        "What does CSV stand for?",
        [
            "Computer Style View",
            "Comma Separated Values",
            "Common Sheet Version",
            "Code Syntax Value",
        ],
        2,
        Domain::Analytics,
        Difficulty::Easy,
    ),
    // Tester
    (
        "What is the purpose of unit testing?",
        [
            "Test the entire system",
            "Test individual components",
            "Test user interface",
            "Test performance",
        ],
        2,
        Domain::Tester,
        Difficulty::Easy,
    ),
    (
        "What is the main purpose of regression testing?",
        [
            "To test new features",
            "To ensure existing functionality still works after changes",
            "To test the user interface",
            "To test performance",
        ],
        2,
        Domain::Tester,
        Difficulty::Medium,
    ),
    (
        "Which of these is a valid bug severity level?",
        ["High", "Complex", "Slow", "Difficult"],
        1,
        Domain::Tester,
        Difficulty::Easy,
    ),
    (
        "What does SDLC stand for?",
        [
            "System Design Life Cycle",
            "Software Development Life Cycle",
            "Software Design Logic Code",
            "System Development Loop Code",
        ],
        2,
        Domain::Tester,
        Difficulty::Easy,
    ),
    (
        "Which tool is commonly used for API testing?",
        ["Selenium", "Postman", "Jira", "Git"],
        2,
        Domain::Tester,
        Difficulty::Easy,
    ),
    (
        "What is 'Black Box' testing?",
        [
            "Testing with knowledge of the internal code",
            "Testing without knowledge of the internal code",
            "Testing only the database",
            "Testing only at night",
        ],
        2,
        Domain::Tester,
        Difficulty::Medium,
    ),
];

/// Built-in questions used when the store and the generator come up short.
#[must_use]
pub fn template_drafts() -> Vec<QuestionDraft> {
    TEMPLATES
        .iter()
        .map(|(text, options, correct, domain, difficulty)| {
            QuestionDraft::new(*text, *options, *correct, *domain, *difficulty)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_template_validates_with_a_unique_key() {
        let mut keys = HashSet::new();
        for draft in template_drafts() {
            let question = draft.validate().expect("template must be valid");
            assert!(keys.insert(question.key()), "duplicate: {}", question.text);
        }
        assert_eq!(keys.len(), TEMPLATES.len());
    }

    #[test]
    fn bank_covers_every_domain() {
        for domain in Domain::ALL {
            assert!(TEMPLATES.iter().any(|t| t.3 == domain));
        }
    }
}
