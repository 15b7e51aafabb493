// Hero roster served by the stub backend.

pub const HEROES: &[&str] = &[
    "Aldous",
    "Alice",
    "Alucard",
    "Angela",
    "Atlas",
    "Aurora",
    "Balmond",
    "Beatrix",
    "Brody",
    "Chang'e",
    "Chou",
    "Claude",
    "Esmeralda",
    "Estes",
    "Eudora",
    "Fanny",
    "Franco",
    "Granger",
    "Gusion",
    "Harith",
    "Hayabusa",
    "Johnson",
    "Kagura",
    "Karrie",
    "Khufra",
    "Lancelot",
    "Lapu-Lapu",
    "Layla",
    "Ling",
    "Lunox",
    "Mathilda",
    "Miya",
    "Nana",
    "Popol and Kupa",
    "Rafaela",
    "Saber",
    "Tigreal",
    "Valir",
    "X.Borg",
    "Yi Sun-shin",
    "Yu Zhong",
    "Zilong",
];

pub fn is_known(hero: &str) -> bool {
    HEROES.contains(&hero)
}
