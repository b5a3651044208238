// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![cfg(feature = "derive")]

use entity_forge_core::prelude::*;

#[derive(Forge, Debug, Clone, Default, PartialEq)]
#[repository]
#[controller(path = "/books")]
#[get_or_create]
pub struct Book {
    #[id]
    pub id:      u64,
    #[validate(not_blank = true, max_length = 120)]
    #[filter(contains)]
    pub name:    String,
    #[relation(kind = many_to_many)]
    #[endpoints(add = true, remove = true)]
    pub tags:    Vec<Tag>,
    #[transient]
    pub scratch: Option<String>
}

#[derive(Forge, Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub id: String
}

#[derive(Forge, Debug, Clone)]
#[config_binding(prefix = "app")]
pub struct Settings {
    #[config_key(name = "listen_port", default = 8080)]
    pub port: u16
}

impl Book {
    #[get_endpoint(path = "/tag-count")]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

#[test]
fn directives_leave_items_unchanged() {
    let book = Book {
        id:      1,
        name:    "Dune".to_owned(),
        tags:    vec![Tag { id: "sf".to_owned() }],
        scratch: None
    };
    assert_eq!(book.tag_count(), 1);
    assert_eq!(book.clone(), book);

    let settings = Settings { port: 80 };
    assert_eq!(settings.port, 80);
}
