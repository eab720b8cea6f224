mod admin;
mod breakpoints;
mod common;
mod shell;
mod steps;
mod variables;
