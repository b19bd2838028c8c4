//! Static per-character transliteration table for the scripts that show up
//! most often in personal music libraries. Characters not covered here fall
//! back to NFKD decomposition plus `any_ascii` in the normalizer.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    pub static ref CHAR_EQUIVALENTS: HashMap<char, &'static str> = {
        let mut m = HashMap::new();

        // Latin letters with diacritics
        for (from, to) in [
            ("àáâãäåāăą", "a"), ("ÀÁÂÃÄÅĀĂĄ", "a"),
            ("çćĉċč", "c"), ("ÇĆĈĊČ", "c"),
            ("ďđ", "d"), ("ĎĐ", "d"),
            ("èéêëēĕėęě", "e"), ("ÈÉÊËĒĔĖĘĚ", "e"),
            ("ĝğġģ", "g"), ("ĜĞĠĢ", "g"),
            ("ĥħ", "h"), ("ĤĦ", "h"),
            ("ìíîïĩīĭįı", "i"), ("ÌÍÎÏĨĪĬĮİ", "i"),
            ("ĵ", "j"), ("Ĵ", "j"),
            ("ķ", "k"), ("Ķ", "k"),
            ("ĺļľłŀ", "l"), ("ĹĻĽŁĿ", "l"),
            ("ñńņňŉ", "n"), ("ÑŃŅŇ", "n"),
            ("òóôõöøōŏő", "o"), ("ÒÓÔÕÖØŌŎŐ", "o"),
            ("ŕŗř", "r"), ("ŔŖŘ", "r"),
            ("śŝşš", "s"), ("ŚŜŞŠ", "s"),
            ("ţťŧ", "t"), ("ŢŤŦ", "t"),
            ("ùúûüũūŭůűų", "u"), ("ÙÚÛÜŨŪŬŮŰŲ", "u"),
            ("ŵ", "w"), ("Ŵ", "w"),
            ("ýÿŷ", "y"), ("ÝŸŶ", "y"),
            ("źżž", "z"), ("ŹŻŽ", "z"),
        ] {
            for c in from.chars() {
                m.insert(c, to);
            }
        }
        for (c, to) in [('æ', "ae"), ('Æ', "ae"), ('œ', "oe"), ('Œ', "oe"),
                        ('ß', "ss"), ('þ', "th"), ('Þ', "th"), ('ð', "d"), ('Ð', "d")] {
            m.insert(c, to);
        }

        // Cyrillic (GOST-ish romanization)
        for (from, to) in [
            ("аА", "a"), ("бБ", "b"), ("вВ", "v"), ("гГ", "g"), ("дД", "d"),
            ("еЕ", "e"), ("ёЁ", "e"), ("жЖ", "zh"), ("зЗ", "z"), ("иИ", "i"),
            ("йЙ", "y"), ("кК", "k"), ("лЛ", "l"), ("мМ", "m"), ("нН", "n"),
            ("оО", "o"), ("пП", "p"), ("рР", "r"), ("сС", "s"), ("тТ", "t"),
            ("уУ", "u"), ("фФ", "f"), ("хХ", "kh"), ("цЦ", "ts"), ("чЧ", "ch"),
            ("шШ", "sh"), ("щЩ", "shch"), ("ъЪ", ""), ("ыЫ", "y"), ("ьЬ", ""),
            ("эЭ", "e"), ("юЮ", "yu"), ("яЯ", "ya"),
            // Ukrainian / Serbian additions
            ("іІ", "i"), ("їЇ", "yi"), ("єЄ", "ye"), ("ґҐ", "g"), ("ђЂ", "dj"),
            ("јЈ", "j"), ("љЉ", "lj"), ("њЊ", "nj"), ("ћЋ", "c"), ("џЏ", "dz"),
        ] {
            for c in from.chars() {
                m.insert(c, to);
            }
        }

        // Greek
        for (from, to) in [
            ("αΑά", "a"), ("βΒ", "v"), ("γΓ", "g"), ("δΔ", "d"), ("εΕέ", "e"),
            ("ζΖ", "z"), ("ηΗή", "i"), ("θΘ", "th"), ("ιΙίϊ", "i"), ("κΚ", "k"),
            ("λΛ", "l"), ("μΜ", "m"), ("νΝ", "n"), ("ξΞ", "x"), ("οΟό", "o"),
            ("πΠ", "p"), ("ρΡ", "r"), ("σΣς", "s"), ("τΤ", "t"), ("υΥύϋ", "y"),
            ("φΦ", "f"), ("χΧ", "ch"), ("ψΨ", "ps"), ("ωΩώ", "o"),
        ] {
            for c in from.chars() {
                m.insert(c, to);
            }
        }

        m
    };
}
