//! Built-in lesson catalog, so the app is useful without any config file.

use crate::domain::{Lesson, WordEntry};

fn w(surface: &str, pos: &str, zh: &str, image: Option<&str>) -> WordEntry {
  WordEntry::new(surface, pos, zh, image)
}

fn lesson(id: &str, title: &str, icon: &str, color: &str, words: Vec<WordEntry>) -> Lesson {
  Lesson {
    id: id.into(),
    title: title.into(),
    icon_glyph: icon.into(),
    theme_color: color.into(),
    words,
  }
}

pub fn seed_lessons() -> Vec<Lesson> {
  vec![
    lesson("animals", "Animals", "🐾", "bg-green-500", vec![
      w("cat", "noun", "猫", Some("🐱")),
      w("dog", "noun", "狗", Some("🐶")),
      w("bird", "noun", "鸟", Some("🐦")),
      w("fish", "noun", "鱼", Some("🐟")),
      w("horse", "noun", "马", Some("🐴")),
      w("cow", "noun", "牛", Some("🐮")),
      w("rabbit", "noun", "兔子", Some("🐰")),
      w("tiger", "noun", "老虎", Some("🐯")),
      w("monkey", "noun", "猴子", Some("🐵")),
      w("elephant", "noun", "大象", Some("🐘")),
    ]),
    lesson("fruits", "Fruits", "🍎", "bg-red-500", vec![
      w("apple", "noun", "苹果", Some("🍎")),
      w("banana", "noun", "香蕉", Some("🍌")),
      w("grape", "noun", "葡萄", Some("🍇")),
      w("orange", "noun", "橙子", Some("🍊")),
      w("pear", "noun", "梨", Some("🍐")),
      w("peach", "noun", "桃子", Some("🍑")),
      w("watermelon", "noun", "西瓜", Some("🍉")),
      w("strawberry", "noun", "草莓", Some("🍓")),
    ]),
    // Few illustrations: image questions stay off for this lesson.
    lesson("actions", "Actions", "🏃", "bg-amber-500", vec![
      w("run", "verb", "跑", Some("🏃")),
      w("swim", "verb", "游泳", Some("🏊")),
      w("sleep", "verb", "睡觉", Some("😴")),
      w("eat", "verb", "吃", None),
      w("drink", "verb", "喝", None),
      w("read", "verb", "读", None),
      w("write", "verb", "写", None),
      w("sing", "verb", "唱歌", None),
    ]),
    lesson("feelings", "Feelings", "😊", "bg-purple-500", vec![
      w("happy", "adjective", "高兴", Some("😄")),
      w("sad", "adjective", "难过", Some("😢")),
      w("angry", "adjective", "生气", Some("😠")),
      w("tired", "adjective", "累", Some("🥱")),
      w("scared", "adjective", "害怕", Some("😨")),
      w("surprised", "adjective", "惊讶", Some("😲")),
    ]),
    // Smaller than the default option count: starting a quiz yields the empty state.
    lesson("greetings", "Greetings", "👋", "bg-sky-500", vec![
      w("hello", "interjection", "你好", Some("👋")),
      w("goodbye", "interjection", "再见", None),
      w("thanks", "interjection", "谢谢", None),
      w("sorry", "adjective", "对不起", None),
    ]),
  ]
}
