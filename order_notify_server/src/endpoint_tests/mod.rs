mod helpers;
mod mocks;
mod send;
mod webhooks;
