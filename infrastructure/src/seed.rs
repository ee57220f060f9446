//! Sample records loaded into the stores at process start.

use domain::{Post, User};

fn user(id: u64, name: &str, username: &str, email: &str) -> User {
    User {
        id,
        name: name.to_string(),
        username: username.to_string(),
        email: email.to_string(),
    }
}

fn post(id: u64, user_id: u64, title: &str, body: &str) -> Post {
    Post {
        id,
        user_id,
        title: title.to_string(),
        body: Some(body.to_string()),
    }
}

pub fn seed_users() -> Vec<User> {
    vec![
        user(1, "Ahmet Yılmaz", "ahmety", "ahmet.yilmaz@example.com"),
        user(2, "Mehmet Demir", "mehmetd", "mehmet.demir@example.com"),
        user(3, "Ayşe Kaya", "aysek", "ayse.kaya@example.com"),
        user(4, "Fatma Çelik", "fatmac", "fatma.celik@example.com"),
        user(5, "Ali Şahin", "alis", "ali.sahin@example.com"),
    ]
}

pub fn seed_posts() -> Vec<Post> {
    vec![
        post(
            1,
            1,
            "İlk Yazım: Yazılıma Başlamak",
            "Yazılıma nereden başlayacağımı çok düşündüm. Önce HTML öğrendim, sonra JavaScript ile devam ettim...",
        ),
        post(
            2,
            1,
            "Frontend mi Backend mi?",
            "Bir yazılımcı olarak ilk kararlardan biri frontend mi yoksa backend mi çalışacağına karar vermek...",
        ),
        post(
            3,
            2,
            "Sabah Sporu Yapmanın Önemi",
            "Her sabah spor yapmak güne daha enerjik başlamanıza yardımcı olur. Ben özellikle koşuyu tercih ediyorum...",
        ),
        post(
            4,
            2,
            "Sağlıklı Beslenme Alışkanlıkları",
            "Fast food yerine evde yemek yapmak hem daha sağlıklı hem de daha ekonomik bir tercih olabilir...",
        ),
        post(
            5,
            3,
            "Kitap Okuma Listem",
            "Bu yıl okumak istediğim kitaplar arasında Suç ve Ceza, Sefiller ve Kürk Mantolu Madonna var...",
        ),
    ]
}
