//! The "how to count kicks" help sheet.

pub const TITLE: &str = "Steps to count fetal kicks";

pub const STEPS: &[&str] = &[
    "Choose a time when you are least distracted or when you typically feel the fetus move.",
    "Get comfortable. Lie on your left side or sit with your feet propped up.",
    "Place your hands on your belly.",
    "Start a timer or watch the clock.",
    "Count each kick. Keep counting until you get to 10 kicks / flutters / swishes / rolls.",
    "Once you reach 10 kicks, jot down how many minutes it took.",
];

pub fn render() -> String {
    let mut out = format!("{}\n\n", TITLE);
    for (i, step) in STEPS.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, step));
    }
    out
}
