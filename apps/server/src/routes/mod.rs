use actix_web::web::ServiceConfig;

mod health;
mod sites;
mod webhooks;

#[cfg(test)]
mod test_support;

pub fn routes(cfg: &mut ServiceConfig) {
    health::routes(cfg);
    sites::routes(cfg);
    webhooks::routes(cfg);
}
