//! Compiled-in default content.
//!
//! Used when a collection has never been persisted, and by
//! [`crate::CollectionStore::reset`]. Only the quiz ships with content.

use crate::model::{Hero, HistoricalEvent, Place, QuizQuestion, WarHero};

#[must_use]
pub fn heroes() -> Vec<Hero> {
    Vec::new()
}

#[must_use]
pub fn war_heroes() -> Vec<WarHero> {
    Vec::new()
}

#[must_use]
pub fn places() -> Vec<Place> {
    Vec::new()
}

#[must_use]
pub fn quiz() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            id: 1,
            question: "У якім годзе Францыск Скарына надрукаваў сваю першую кнігу?".into(),
            options: ["1517".into(), "1410".into(), "1569".into(), "1588".into()],
            correct_answer: 0,
            explanation: "6 жніўня 1517 года Францыск Скарына выдаў у Празе 'Псалтыр' — першую друкаваную кнігу на старабеларускай мове.".into(),
            image: None,
        },
        QuizQuestion {
            id: 2,
            question: "Што такое 'Слуцкі пояс'?".into(),
            options: [
                "Від старажытнай зброі".into(),
                "Элемент мужчынскага касцюма шляхты".into(),
                "Назва ракі ў Слуцку".into(),
                "Грашовая адзінка ВКЛ".into(),
            ],
            correct_answer: 1,
            explanation: "Слуцкі пояс — элемент мужчынскага касцюма Вялікага княства Літоўскага, сімвал шляхецкай годнасці і багацця.".into(),
            image: None,
        },
    ]
}

#[must_use]
pub fn events() -> Vec<HistoricalEvent> {
    Vec::new()
}
